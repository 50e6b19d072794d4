pub mod loss_test;
