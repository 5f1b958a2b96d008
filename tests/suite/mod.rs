mod config;
mod navigation;
mod rehydrate;
mod workflow;
