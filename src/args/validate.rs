use super::types::Args;

impl Args {
    /// # Errors
    ///
    /// Will return `Err` if a size or interval is zero or the database name is blank
    pub fn validate(&self) -> Result<(), String> {
        if self.db_name.trim().is_empty() {
            return Err("Database name is required".to_string());
        }
        if self.tick_ms == 0 {
            return Err("tick-ms must be at least 1".to_string());
        }
        if self.cut_size == 0 {
            return Err("cut-size must be at least 1".to_string());
        }
        if self.initial_group_size == 0 || self.weekend_group_size == 0 {
            return Err("group sizes must be at least 1".to_string());
        }
        Ok(())
    }
}
