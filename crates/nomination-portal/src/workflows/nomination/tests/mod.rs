mod common;
mod drafts;
mod uploads;
mod wizard;
