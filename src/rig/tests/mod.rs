mod test_parenting_basic;
mod test_rename_basic;
