//! Report metrics derived from already-fetched collections
//!
//! Nothing here performs I/O. A [`RangePreset`] resolves against the current
//! time into an inclusive [`DateWindow`]; [`compute_metrics`] filters the
//! invoice, appointment, work order and customer slices to that window and
//! derives counts, sums and ratios. Every ratio floors its denominator at 1,
//! so an empty window yields zeros rather than `NaN`.
//!
//! [`MetricsMemo`] recomputes only when the window or one of the input
//! collections' revisions changes.

use crate::domains::appointments::AppointmentStatus;
use crate::domains::invoices::InvoiceStatus;
use crate::domains::services::WorkOrderStatus;
use crate::domains::{Appointments, Customers, Invoices, WorkOrders};
use crate::slice::{EntityId, SliceState};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of entries in [`ReportMetrics::top_services`]
pub const TOP_SERVICES: usize = 5;

/// Days a custom range reaches back when no start is given
pub const DEFAULT_CUSTOM_DAYS: i64 = 30;

/// Report errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// Range selector not recognised
    #[error("Unknown date range '{0}' (expected 7d, 30d, 90d, 1y or custom)")]
    UnknownRange(String),
}

/// Symbolic date range selector
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RangePreset {
    /// Last 7 days
    Last7Days,
    /// Last 30 days
    #[default]
    Last30Days,
    /// Last 90 days
    Last90Days,
    /// Last 365 days
    LastYear,
    /// Explicit bounds; `end` defaults to now, `start` to 30 days before now
    Custom {
        /// Lower bound
        start: Option<DateTime<Utc>>,
        /// Upper bound
        end: Option<DateTime<Utc>>,
    },
}

impl RangePreset {
    /// Selector as accepted by [`FromStr`]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Last7Days => "7d",
            Self::Last30Days => "30d",
            Self::Last90Days => "90d",
            Self::LastYear => "1y",
            Self::Custom { .. } => "custom",
        }
    }

    /// Resolve to a concrete window ending at (or before) `now`
    #[must_use]
    pub fn resolve(&self, now: DateTime<Utc>) -> DateWindow {
        let days_back = |days| DateWindow {
            start: now - Duration::days(days),
            end: now,
        };

        match *self {
            Self::Last7Days => days_back(7),
            Self::Last30Days => days_back(30),
            Self::Last90Days => days_back(90),
            Self::LastYear => days_back(365),
            Self::Custom { start, end } => DateWindow {
                start: start.unwrap_or_else(|| now - Duration::days(DEFAULT_CUSTOM_DAYS)),
                end: end.unwrap_or(now),
            },
        }
    }
}

impl fmt::Display for RangePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RangePreset {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7d" => Ok(Self::Last7Days),
            "30d" => Ok(Self::Last30Days),
            "90d" => Ok(Self::Last90Days),
            "1y" => Ok(Self::LastYear),
            "custom" => Ok(Self::Custom {
                start: None,
                end: None,
            }),
            _ => Err(ReportError::UnknownRange(s.to_string())),
        }
    }
}

/// Inclusive time window
///
/// A window whose start lies after its end contains nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DateWindow {
    /// Lower bound, inclusive
    pub start: DateTime<Utc>,
    /// Upper bound, inclusive
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// Whether `at` falls inside the window
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    /// Same as [`contains`](Self::contains); records without a date are outside
    #[must_use]
    pub fn contains_opt(&self, at: Option<DateTime<Utc>>) -> bool {
        at.is_some_and(|at| self.contains(at))
    }

    /// True when no instant can fall inside
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

/// Slices the reports read
#[derive(Clone, Copy, Debug)]
pub struct ReportInputs<'a> {
    /// Invoices, dated by issue date (or creation)
    pub invoices: &'a SliceState<Invoices>,
    /// Appointments, dated by scheduled date
    pub appointments: &'a SliceState<Appointments>,
    /// Work orders, dated by creation
    pub work_orders: &'a SliceState<WorkOrders>,
    /// Customers, dated by creation
    pub customers: &'a SliceState<Customers>,
}

impl ReportInputs<'_> {
    const fn revisions(&self) -> [u64; 4] {
        [
            self.invoices.revision,
            self.appointments.revision,
            self.work_orders.revision,
            self.customers.revision,
        ]
    }
}

/// Revenue collected on one day
#[derive(Clone, Debug, PartialEq)]
pub struct DailyRevenue {
    /// Calendar day (UTC)
    pub date: NaiveDate,
    /// Paid invoice totals issued that day
    pub revenue: f64,
}

/// Revenue attributed to one catalog service
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceRevenue {
    /// Service name as written on the work order
    pub name: String,
    /// Lines billed
    pub count: usize,
    /// Sum of price × quantity
    pub revenue: f64,
}

/// Work orders assigned to one technician
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TechnicianLoad {
    /// Technician
    pub technician_id: EntityId,
    /// Work orders assigned in the window
    pub assigned: usize,
    /// Of those, completed
    pub completed: usize,
}

/// Everything the reports view shows for one window
#[derive(Clone, Debug, PartialEq)]
pub struct ReportMetrics {
    /// Window the metrics were computed for
    pub window: DateWindow,

    /// Sum of paid invoice totals
    pub total_revenue: f64,
    /// Sum of sent and overdue invoice totals
    pub outstanding_amount: f64,
    /// Invoices in the window
    pub invoice_count: usize,
    /// Paid invoices in the window
    pub paid_invoices: usize,
    /// Overdue invoices in the window
    pub overdue_invoices: usize,
    /// paid / invoices
    pub payment_rate: f64,
    /// revenue / paid invoices
    pub average_invoice_value: f64,

    /// Appointments in the window
    pub appointment_count: usize,
    /// Completed appointments
    pub completed_appointments: usize,
    /// Cancelled or no-show appointments
    pub cancelled_appointments: usize,
    /// completed / appointments
    pub appointment_completion_rate: f64,
    /// cancelled / appointments
    pub cancellation_rate: f64,

    /// Work orders in the window
    pub work_order_count: usize,
    /// Completed work orders
    pub completed_work_orders: usize,
    /// completed / work orders
    pub work_order_completion_rate: f64,

    /// Customers created in the window
    pub new_customers: usize,

    /// Paid revenue per day, ascending, days without revenue omitted
    pub revenue_by_day: Vec<DailyRevenue>,
    /// Invoice count per status
    pub invoice_status_breakdown: BTreeMap<InvoiceStatus, usize>,
    /// Best-earning services, highest first
    pub top_services: Vec<ServiceRevenue>,
    /// Work order load per technician, busiest first
    pub technician_workload: Vec<TechnicianLoad>,
}

/// `numerator / max(denominator, 1)`
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn rate(numerator: usize, denominator: usize) -> f64 {
    mean(numerator as f64, denominator)
}

/// `total / max(count, 1)`
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn mean(total: f64, count: usize) -> f64 {
    total / count.max(1) as f64
}

/// Compute all report metrics for `window`
#[must_use]
pub fn compute_metrics(inputs: &ReportInputs<'_>, window: DateWindow) -> ReportMetrics {
    // Invoices
    let invoices: Vec<_> = inputs
        .invoices
        .items
        .iter()
        .filter(|invoice| window.contains_opt(invoice.report_date()))
        .collect();

    let mut total_revenue = 0.0;
    let mut outstanding_amount = 0.0;
    let mut paid_invoices = 0;
    let mut overdue_invoices = 0;
    let mut invoice_status_breakdown = BTreeMap::new();
    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for invoice in &invoices {
        *invoice_status_breakdown.entry(invoice.status).or_insert(0) += 1;
        match invoice.status {
            InvoiceStatus::Paid => {
                paid_invoices += 1;
                total_revenue += invoice.total;
                if let Some(date) = invoice.report_date() {
                    *daily.entry(date.date_naive()).or_insert(0.0) += invoice.total;
                }
            },
            InvoiceStatus::Overdue => {
                overdue_invoices += 1;
                outstanding_amount += invoice.total;
            },
            InvoiceStatus::Sent => outstanding_amount += invoice.total,
            InvoiceStatus::Draft | InvoiceStatus::Cancelled | InvoiceStatus::Other => {},
        }
    }

    // Appointments
    let appointments: Vec<_> = inputs
        .appointments
        .items
        .iter()
        .filter(|appointment| window.contains_opt(appointment.scheduled_date))
        .collect();
    let completed_appointments = appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Completed)
        .count();
    let cancelled_appointments = appointments
        .iter()
        .filter(|a| matches!(a.status, AppointmentStatus::Cancelled | AppointmentStatus::NoShow))
        .count();

    // Work orders
    let work_orders: Vec<_> = inputs
        .work_orders
        .items
        .iter()
        .filter(|order| window.contains_opt(order.created_at))
        .collect();
    let completed_work_orders = work_orders
        .iter()
        .filter(|order| order.status == WorkOrderStatus::Completed)
        .count();

    let mut services: HashMap<&str, ServiceRevenue> = HashMap::new();
    let mut workload: HashMap<&EntityId, TechnicianLoad> = HashMap::new();

    for order in &work_orders {
        if order.status == WorkOrderStatus::Cancelled {
            continue;
        }
        for line in &order.services {
            let entry = services.entry(line.name.as_str()).or_insert_with(|| ServiceRevenue {
                name: line.name.clone(),
                count: 0,
                revenue: 0.0,
            });
            entry.count += 1;
            entry.revenue += line.price * line.quantity;
        }
        if let Some(technician_id) = &order.technician_id {
            let load = workload.entry(technician_id).or_insert_with(|| TechnicianLoad {
                technician_id: technician_id.clone(),
                assigned: 0,
                completed: 0,
            });
            load.assigned += 1;
            if order.status == WorkOrderStatus::Completed {
                load.completed += 1;
            }
        }
    }

    let mut top_services: Vec<_> = services.into_values().filter(|s| !s.name.is_empty()).collect();
    top_services.sort_by(|a, b| b.revenue.total_cmp(&a.revenue).then_with(|| a.name.cmp(&b.name)));
    top_services.truncate(TOP_SERVICES);

    let mut technician_workload: Vec<_> = workload.into_values().collect();
    technician_workload.sort_by(|a, b| {
        b.assigned
            .cmp(&a.assigned)
            .then_with(|| a.technician_id.cmp(&b.technician_id))
    });

    // Customers
    let new_customers = inputs
        .customers
        .items
        .iter()
        .filter(|customer| window.contains_opt(customer.created_at))
        .count();

    ReportMetrics {
        window,
        total_revenue,
        outstanding_amount,
        invoice_count: invoices.len(),
        paid_invoices,
        overdue_invoices,
        payment_rate: rate(paid_invoices, invoices.len()),
        average_invoice_value: mean(total_revenue, paid_invoices),
        appointment_count: appointments.len(),
        completed_appointments,
        cancelled_appointments,
        appointment_completion_rate: rate(completed_appointments, appointments.len()),
        cancellation_rate: rate(cancelled_appointments, appointments.len()),
        work_order_count: work_orders.len(),
        completed_work_orders,
        work_order_completion_rate: rate(completed_work_orders, work_orders.len()),
        new_customers,
        revenue_by_day: daily
            .into_iter()
            .map(|(date, revenue)| DailyRevenue { date, revenue })
            .collect(),
        invoice_status_breakdown,
        top_services,
        technician_workload,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct MemoKey {
    window: DateWindow,
    revisions: [u64; 4],
}

/// Caches the last [`ReportMetrics`] per window and input revisions
#[derive(Debug, Default)]
pub struct MetricsMemo {
    cached: Option<(MemoKey, ReportMetrics)>,
    computations: u64,
}

impl MetricsMemo {
    /// Empty memo
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Metrics for `window`, recomputed only when the key changed
    pub fn get(&mut self, inputs: &ReportInputs<'_>, window: DateWindow) -> &ReportMetrics {
        let key = MemoKey {
            window,
            revisions: inputs.revisions(),
        };

        if self.cached.as_ref().is_some_and(|(cached, _)| *cached != key) {
            self.cached = None;
        }

        let computations = &mut self.computations;
        let (_, metrics) = self.cached.get_or_insert_with(|| {
            *computations += 1;
            tracing::debug!(computations = *computations, "Recomputing report metrics");
            (key, compute_metrics(inputs, window))
        });
        metrics
    }

    /// How many times metrics were actually computed
    #[must_use]
    pub const fn computations(&self) -> u64 {
        self.computations
    }

    /// Drop the cached value
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}
