//! GreenCampus - gamified campus sustainability
//!
//! Students scan QR codes placed around campus to complete eco-missions,
//! earn points, climb the leaderboard and redeem points for rewards. Admins
//! manage the mission and reward catalogs.
//!
//! ## Ledger guarantees
//!
//! All point movements go through [`ledger`], one SQLite transaction per
//! operation:
//!
//! 1. **One completion per mission**: a UNIQUE (user, mission) constraint
//!    rejects double scans, including concurrent ones.
//! 2. **No overselling**: stock is decremented with a conditional update
//!    and a `CHECK (stock >= 0)`.
//! 3. **No negative balances**: points are debited with a conditional update
//!    and a `CHECK (points >= 0)`.

pub mod account;
pub mod campus;
pub mod capture;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod leaderboard;
pub mod ledger;
pub mod progress;
pub mod qr;
pub mod seed;
pub mod server;
pub mod store;

pub use campus::Campus;
pub use domain::*;
