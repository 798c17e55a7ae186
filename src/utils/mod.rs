pub mod geo;
pub mod shift_date;
pub mod time_calc;
