use crate::errors::{AppError, ResultExt};
use crate::models::{Mentor, MentorInput, Student, StudentInput, Team, TeamInput};
use sqlx::PgPool;

/// CRUD for the mentor, student and team tables.
///
/// Listing returns whole tables; search, sort and paging happen in memory
/// in the list views.
#[derive(Clone)]
pub struct RecordStore {
    pool: PgPool,
}

impl RecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ============ Teams ============

    pub async fn list_teams(&self) -> Result<Vec<Team>, AppError> {
        sqlx::query_as::<_, Team>("SELECT * FROM gears_teams ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .context("listing teams")
    }

    pub async fn get_team(&self, id: i64) -> Result<Team, AppError> {
        sqlx::query_as::<_, Team>("SELECT * FROM gears_teams WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Team with id {} not found", id)))
    }

    pub async fn create_team(&self, input: &TeamInput) -> Result<Team, AppError> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO gears_teams (name, team_number, program, archived, hall_of_fame)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(input.team_number)
        .bind(&input.program)
        .bind(input.archived)
        .bind(input.hall_of_fame)
        .fetch_one(&self.pool)
        .await
        .context("creating team")?;

        tracing::info!("Created team {} ({})", team.id, team.name);
        Ok(team)
    }

    pub async fn update_team(&self, id: i64, input: &TeamInput) -> Result<Team, AppError> {
        sqlx::query_as::<_, Team>(
            r#"
            UPDATE gears_teams
            SET name = $2, team_number = $3, program = $4, archived = $5, hall_of_fame = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.team_number)
        .bind(&input.program)
        .bind(input.archived)
        .bind(input.hall_of_fame)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Team with id {} not found", id)))
    }

    /// Deletes a team. Its mentors and students are detached, not deleted.
    pub async fn delete_team(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM gears_teams WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("deleting team")?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Team with id {} not found", id)));
        }
        tracing::info!("Deleted team {}", id);
        Ok(())
    }

    // ============ Mentors ============

    pub async fn list_mentors(&self) -> Result<Vec<Mentor>, AppError> {
        sqlx::query_as::<_, Mentor>("SELECT * FROM gears_mentors ORDER BY last_name, first_name")
            .fetch_all(&self.pool)
            .await
            .context("listing mentors")
    }

    pub async fn get_mentor(&self, id: i64) -> Result<Mentor, AppError> {
        sqlx::query_as::<_, Mentor>("SELECT * FROM gears_mentors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Mentor with id {} not found", id)))
    }

    /// Mentors among `ids`. Unknown ids are skipped.
    pub async fn get_mentors(&self, ids: &[i64]) -> Result<Vec<Mentor>, AppError> {
        sqlx::query_as::<_, Mentor>("SELECT * FROM gears_mentors WHERE id = ANY($1) ORDER BY id")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .context("loading mentors")
    }

    pub async fn create_mentor(&self, input: &MentorInput) -> Result<Mentor, AppError> {
        let mentor = sqlx::query_as::<_, Mentor>(
            r#"
            INSERT INTO gears_mentors (first_name, last_name, email, phone, address, notes, team_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.notes)
        .bind(input.team_id)
        .fetch_one(&self.pool)
        .await
        .context("creating mentor")?;

        tracing::info!("Created mentor {}", mentor.id);
        Ok(mentor)
    }

    pub async fn update_mentor(&self, id: i64, input: &MentorInput) -> Result<Mentor, AppError> {
        sqlx::query_as::<_, Mentor>(
            r#"
            UPDATE gears_mentors
            SET first_name = $2, last_name = $3, email = $4, phone = $5,
                address = $6, notes = $7, team_id = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.notes)
        .bind(input.team_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Mentor with id {} not found", id)))
    }

    pub async fn delete_mentor(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM gears_mentors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("deleting mentor")?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Mentor with id {} not found", id)));
        }
        Ok(())
    }

    // ============ Students ============

    pub async fn list_students(&self) -> Result<Vec<Student>, AppError> {
        sqlx::query_as::<_, Student>("SELECT * FROM gears_students ORDER BY last_name, first_name")
            .fetch_all(&self.pool)
            .await
            .context("listing students")
    }

    pub async fn get_student(&self, id: i64) -> Result<Student, AppError> {
        sqlx::query_as::<_, Student>("SELECT * FROM gears_students WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student with id {} not found", id)))
    }

    /// Students whose parent is QBO customer `customer_id`.
    pub async fn students_for_customer(&self, customer_id: &str) -> Result<Vec<Student>, AppError> {
        sqlx::query_as::<_, Student>(
            "SELECT * FROM gears_students WHERE customer_id = $1 ORDER BY last_name, first_name",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .context("loading students for customer")
    }

    pub async fn create_student(&self, input: &StudentInput) -> Result<Student, AppError> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO gears_students (first_name, last_name, grade, team_id, customer_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(input.grade)
        .bind(input.team_id)
        .bind(&input.customer_id)
        .fetch_one(&self.pool)
        .await
        .context("creating student")?;

        tracing::info!("Created student {}", student.id);
        Ok(student)
    }

    pub async fn update_student(&self, id: i64, input: &StudentInput) -> Result<Student, AppError> {
        sqlx::query_as::<_, Student>(
            r#"
            UPDATE gears_students
            SET first_name = $2, last_name = $3, grade = $4, team_id = $5, customer_id = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(input.grade)
        .bind(input.team_id)
        .bind(&input.customer_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Student with id {} not found", id)))
    }

    pub async fn delete_student(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM gears_students WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("deleting student")?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Student with id {} not found", id)));
        }
        Ok(())
    }
}
