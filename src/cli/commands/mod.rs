mod ingredients;
mod tags;

pub use ingredients::{cmd_ingredients_import, cmd_ingredients_list};
pub use tags::{cmd_tags_add, cmd_tags_list};
