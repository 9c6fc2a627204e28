//! Text rendering of fetched data for the terminal.

pub mod summary;
pub mod table;

pub use summary::{
    render_allocations, render_fetch_error, render_overview, render_technical, COMPANY_OVERVIEW,
    STOCK_DATA,
};
pub use table::{Align, TextTable};
