mod parsing_test;
