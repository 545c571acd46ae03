// Public library interface for nestmap
// The debug CLI tool and renderers use these modules directly

pub mod layout;
pub mod tree;
