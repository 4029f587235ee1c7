pub mod budget;
pub mod expense;
pub mod savings_goal;
pub mod savings_record;
