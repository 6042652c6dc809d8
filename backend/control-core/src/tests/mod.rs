mod debounce;
mod locator;
mod reclaim;
mod status;
mod trigger;
