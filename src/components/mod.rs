pub mod scorebug;
