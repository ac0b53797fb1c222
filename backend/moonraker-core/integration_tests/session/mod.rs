mod fake_moonraker;
mod lifecycle;
