mod test_utils;

mod byte_order_tests;
mod types_tests;
mod directory_read_tests;
mod strip_io_tests;
