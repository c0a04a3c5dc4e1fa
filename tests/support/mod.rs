pub mod body_utils;
