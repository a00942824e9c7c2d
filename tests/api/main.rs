mod helpers;
mod health_check;
mod user_profile;
mod catalog;
mod cart;
mod address;
mod jobs;
