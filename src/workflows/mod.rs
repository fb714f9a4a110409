pub mod shortlist;
