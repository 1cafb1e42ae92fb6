mod accounts;
mod comments;
mod posts;
mod sites;
