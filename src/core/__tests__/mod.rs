pub mod types_test;
