pub mod header;
pub mod help_overlay;
pub mod recommendation_list;
pub mod search_bar;
pub mod tag_cloud;
