pub(crate) mod post_store;
