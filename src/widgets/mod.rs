pub mod controls;
pub mod file_list;
pub mod page_table;
