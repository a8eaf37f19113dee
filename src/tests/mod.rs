
mod datastore;
mod props;
mod queries;
