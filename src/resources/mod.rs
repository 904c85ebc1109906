//! Backend records shown outside the live views
//!
//! Wire names are Spanish; fields are renamed on the way in and out.

mod clients;
mod feeds;
mod gps;
mod stats;
mod vehicles;

pub use clients::{City, Client, ClientForm, ClientOption, ClientPayload, ClientUpdate};
pub use feeds::{
    dispatch_endpoint, dispatch_feed, format_date, format_date_time, format_time,
    gps_feed, gps_feed_endpoint, Direction, Dispatch, DispatchFeed, GpsFeed, GpsFeedItem,
    DISPATCH_CLIENT_FILTER, DISPATCH_FILTERS,
};
pub use gps::{GpsDevice, GpsDeviceForm, GpsDevicePayload};
pub use stats::{InstalledGpsTotals, ModelDistribution, ModelShare, RecentGps};
pub use vehicles::{
    AssignmentOptions, AssignmentStep, NewVehicle, Owner, Vehicle, VehicleAssignment,
};
