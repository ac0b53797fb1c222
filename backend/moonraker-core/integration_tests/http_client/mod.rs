mod oneshot_token;
mod reachability;
