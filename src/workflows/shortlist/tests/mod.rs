mod common;

mod restore;
