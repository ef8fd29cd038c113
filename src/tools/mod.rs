pub mod substack {
    pub mod prompts;
    pub mod resources;
    pub mod tool_router;
}
