mod entry;
mod food;
mod helpers;
mod import;
mod log;
mod query;
mod report;

pub(crate) use entry::{cmd_delete, cmd_prune, cmd_show, cmd_update};
pub(crate) use food::{cmd_food_add, cmd_food_delete, cmd_food_list};
pub(crate) use import::cmd_food_import;
pub(crate) use log::cmd_log;
pub(crate) use query::{cmd_day, cmd_range, cmd_search};
pub(crate) use report::cmd_report;
