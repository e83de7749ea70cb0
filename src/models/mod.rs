pub mod catalog;
pub mod file_info;
pub mod match_result;
pub mod scan_result;
