mod notation_test;
