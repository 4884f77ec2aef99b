//! Definition stage markers shared by every resource type.
//! Types with extra required settings declare their own markers next to
//! the resource.

/// Nothing but the name has been supplied
#[derive(Debug)]
pub enum Blank {}

/// Region supplied, resource group still required
#[derive(Debug)]
pub enum WithGroup {}

/// Every required setting supplied; optional settings and `create` available
#[derive(Debug)]
pub enum WithCreate {}

/// Child definition complete; `attach` available
#[derive(Debug)]
pub enum WithAttach {}
