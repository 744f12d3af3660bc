mod walk;

pub use walk::{Candidates, PathScanner};
