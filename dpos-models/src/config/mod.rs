// Copyright (c) 2022 MASSA LABS <info@massa.net>

/// Hard-coded network constants
pub mod constants;
