// Copyright (c) 2022 MASSA LABS <info@massa.net>

mod apply;
mod tools;
mod types;
mod verify;
