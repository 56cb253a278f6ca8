mod detect;
mod properties;
