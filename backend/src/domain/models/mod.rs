pub mod budget;
pub mod expense;
pub mod notification;
pub mod savings_goal;
pub mod savings_record;
