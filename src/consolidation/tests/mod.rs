mod carry_over;
mod helpers;
