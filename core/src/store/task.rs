use super::{text_enum, QuestStore, TaskRow};
use crate::{
    error::QuestResult,
    recurrence::{TaskSchedule, TaskStatus},
    types::Timestamp,
};
use rusqlite::{params, OptionalExtension, Row};

const TASK_COLUMNS: &str = "task_id, player_id, title, description, status, difficulty,
    is_permanent, repeat_interval_days, repeat_anchor, deadline, completed_at, created_at";

impl QuestStore {
    // ── Task ──────────────────────────────────────────────────────

    pub fn insert_task(&self, t: &TaskRow) -> QuestResult<()> {
        let s = &t.schedule;
        self.conn.execute(
            &format!(
                "INSERT INTO task ({TASK_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ),
            params![
                t.task_id,
                t.player_id,
                t.title,
                t.description,
                s.status.as_str(),
                s.difficulty,
                s.is_permanent,
                s.interval_days,
                s.anchor,
                s.deadline,
                s.completed_at,
                t.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn task(&self, task_id: &str) -> QuestResult<Option<TaskRow>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM task WHERE task_id = ?1"),
                params![task_id],
                task_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn tasks_for_player(&self, player_id: &str) -> QuestResult<Vec<TaskRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM task WHERE player_id = ?1 ORDER BY created_at ASC, task_id ASC"
        ))?;
        let rows = stmt.query_map(params![player_id], task_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn update_task_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        completed_at: Option<Timestamp>,
    ) -> QuestResult<()> {
        self.conn.execute(
            "UPDATE task SET status = ?2, completed_at = ?3 WHERE task_id = ?1",
            params![task_id, status.as_str(), completed_at],
        )?;
        Ok(())
    }

    /// Outstanding tasks: what drives storm speed.
    pub fn pending_task_count(&self, player_id: &str) -> QuestResult<u32> {
        let n: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM task WHERE player_id = ?1 AND status = 'pending'",
            params![player_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<TaskRow> {
    Ok(TaskRow {
        task_id:     row.get(0)?,
        player_id:   row.get(1)?,
        title:       row.get(2)?,
        description: row.get(3)?,
        schedule: TaskSchedule {
            status:        text_enum(4, row.get(4)?, TaskStatus::parse)?,
            difficulty:    row.get(5)?,
            is_permanent:  row.get(6)?,
            interval_days: row.get(7)?,
            anchor:        row.get(8)?,
            deadline:      row.get(9)?,
            completed_at:  row.get(10)?,
        },
        created_at:  row.get(11)?,
    })
}
