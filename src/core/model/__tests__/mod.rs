pub mod conv_lstm_test;
