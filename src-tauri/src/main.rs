// Prevents additional console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
    fkey_macros_lib::logging::init();
    fkey_macros_lib::run()
}
