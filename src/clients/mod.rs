pub mod substack;
