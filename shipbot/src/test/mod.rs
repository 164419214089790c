mod handlers;
mod mocks;
