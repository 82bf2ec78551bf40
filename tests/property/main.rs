// tests/property/main.rs

mod scheduler;
