//! Database service for order-service.
//!
//! Every multi-row write (invoice save, status transition, payment) runs in
//! a single transaction so concurrent terminals against the same store never
//! observe half-applied changes.

use crate::models::{
    check_transition, format_invoice_number, fragment_ready, normalize_phone, ActorRole,
    CreateInvoice, Customer, Invoice, InvoiceLine, ListInvoicesFilter, OrderStatus, PaymentError,
    PaymentMethod, ServiceItem,
};
use crate::services::metrics::{
    record_payment, record_transition, DB_QUERY_DURATION, INVOICES_CREATED_TOTAL,
};
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions, Postgres};
use sqlx::Transaction;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "order-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Pricing Catalog Operations
    // -------------------------------------------------------------------------

    /// List pricing catalog entries.
    #[instrument(skip(self))]
    pub async fn list_service_items(&self, active_only: bool) -> Result<Vec<ServiceItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_service_items"])
            .start_timer();

        let items = sqlx::query_as::<_, ServiceItem>(
            r#"
            SELECT service_item_id, name, category, price_wash, price_iron, price_wash_iron, active, created_utc
            FROM service_items
            WHERE ($1::bool = FALSE OR active = TRUE)
            ORDER BY category, name
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list service items: {}", e))
        })?;

        timer.observe_duration();

        Ok(items)
    }

    /// Fetch the catalog entries referenced by a draft, in one round trip.
    #[instrument(skip(self, ids))]
    pub async fn get_service_items(&self, ids: &[Uuid]) -> Result<Vec<ServiceItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_service_items"])
            .start_timer();

        let items = sqlx::query_as::<_, ServiceItem>(
            r#"
            SELECT service_item_id, name, category, price_wash, price_iron, price_wash_iron, active, created_utc
            FROM service_items
            WHERE service_item_id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get service items: {}", e))
        })?;

        timer.observe_duration();

        Ok(items)
    }

    // -------------------------------------------------------------------------
    // Customer Operations
    // -------------------------------------------------------------------------

    /// Suggest a customer for a partially typed phone number.
    ///
    /// Matches the raw phone and the digit-normalized form; when several
    /// customers match, the earliest-created row wins so the suggestion is
    /// deterministic.
    #[instrument(skip(self))]
    pub async fn find_customer_by_phone_fragment(
        &self,
        fragment: &str,
    ) -> Result<Option<Customer>, AppError> {
        if !fragment_ready(fragment) {
            return Ok(None);
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_customer_by_phone_fragment"])
            .start_timer();

        let raw = fragment.trim();
        let digits = normalize_phone(raw);

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT customer_id, name, phone, phone_digits, email, order_count, total_spent, created_utc, updated_utc
            FROM customers
            WHERE phone LIKE '%' || $1 || '%'
               OR ($2 <> '' AND phone_digits LIKE '%' || $2 || '%')
            ORDER BY created_utc, customer_id
            LIMIT 1
            "#,
        )
        .bind(raw)
        .bind(&digits)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to match customer: {}", e)))?;

        timer.observe_duration();

        Ok(customer)
    }

    /// Find-or-create a customer by exact phone inside the save transaction.
    ///
    /// The unique constraint on `phone` plus the upsert makes this a single
    /// atomic unit: two terminals saving invoices for the same new customer
    /// end up sharing one row. An existing non-empty name wins over newly
    /// typed input; an empty stored name is replaced.
    async fn resolve_or_create_customer(
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
        phone: &str,
        email: Option<&str>,
    ) -> Result<Customer, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (customer_id, name, phone, phone_digits, email)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (phone) DO UPDATE
            SET name = CASE WHEN customers.name = '' THEN EXCLUDED.name ELSE customers.name END,
                email = COALESCE(customers.email, EXCLUDED.email),
                updated_utc = NOW()
            RETURNING customer_id, name, phone, phone_digits, email, order_count, total_spent, created_utc, updated_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(phone)
        .bind(normalize_phone(phone))
        .bind(email)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to resolve customer: {}", e))
        })?;

        Ok(customer)
    }

    /// Claim the next invoice number inside the save transaction.
    ///
    /// A single increment-and-read statement, so concurrent saves serialize
    /// on the counter row and can never share a number. If the increment
    /// cannot be persisted the whole transaction rolls back and no number is
    /// handed out.
    async fn next_invoice_seq(tx: &mut Transaction<'_, Postgres>) -> Result<i64, AppError> {
        let seq = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE invoice_counters
            SET last_value = last_value + 1
            WHERE counter = 'invoice'
            RETURNING last_value
            "#,
        )
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to advance invoice counter: {}", e))
        })?;

        seq.ok_or_else(|| AppError::DatabaseError(anyhow::anyhow!("Invoice counter row is missing")))
    }

    // -------------------------------------------------------------------------
    // Invoice Operations
    // -------------------------------------------------------------------------

    /// Save a priced draft as an invoice.
    ///
    /// Resolves the customer, claims the next number and writes the invoice
    /// with its line snapshots in one transaction. The order starts at
    /// `received`, unpaid, with the payment method pending.
    #[instrument(skip(self, input), fields(customer_phone = %input.customer_phone))]
    pub async fn create_invoice(
        &self,
        input: &CreateInvoice,
    ) -> Result<(Invoice, Vec<InvoiceLine>), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let customer = Self::resolve_or_create_customer(
            &mut tx,
            &input.customer_name,
            &input.customer_phone,
            input.customer_email.as_deref(),
        )
        .await?;

        let seq = Self::next_invoice_seq(&mut tx).await?;
        let invoice_number = format_invoice_number(seq);

        let invoice_id = Uuid::new_v4();
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (
                invoice_id, invoice_number, customer_id, customer_name, customer_phone, customer_email,
                delivery_date, status, payment_method, paid, subtotal, tax, total, employee_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'received', 'pending', FALSE, $8, $9, $10, $11)
            RETURNING invoice_id, invoice_number, customer_id, customer_name, customer_phone, customer_email,
                delivery_date, status, payment_method, paid, subtotal, tax, total, employee_id,
                cancelled_reason, cancelled_by, created_utc, paid_utc, delivered_utc, cancelled_utc
            "#,
        )
        .bind(invoice_id)
        .bind(&invoice_number)
        .bind(customer.customer_id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(customer.email.as_deref())
        .bind(input.delivery_date)
        .bind(input.totals.subtotal)
        .bind(input.totals.tax)
        .bind(input.totals.total)
        .bind(input.employee_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create invoice: {}", e)))?;

        let mut lines = Vec::with_capacity(input.lines.len());
        for (i, line) in input.lines.iter().enumerate() {
            let inserted = sqlx::query_as::<_, InvoiceLine>(
                r#"
                INSERT INTO invoice_lines (
                    line_id, invoice_id, service_item_id, description, variant, quantity,
                    unit_price, total, sort_order
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING line_id, invoice_id, service_item_id, description, variant, quantity,
                    unit_price, total, sort_order, created_utc
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(invoice_id)
            .bind(line.service_item_id)
            .bind(&line.description)
            .bind(line.variant.as_str())
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.total)
            .bind(i as i32)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert line item: {}", e))
            })?;
            lines.push(inserted);
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        if let Some(counter) = INVOICES_CREATED_TOTAL.get() {
            counter.inc();
        }

        info!(
            invoice_id = %invoice.invoice_id,
            invoice_number = %invoice.invoice_number,
            line_count = lines.len(),
            total = %invoice.total,
            "Invoice created"
        );

        Ok((invoice, lines))
    }

    /// Get an invoice by ID.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT invoice_id, invoice_number, customer_id, customer_name, customer_phone, customer_email,
                delivery_date, status, payment_method, paid, subtotal, tax, total, employee_id,
                cancelled_reason, cancelled_by, created_utc, paid_utc, delivered_utc, cancelled_utc
            FROM invoices
            WHERE invoice_id = $1
            "#,
        )
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        timer.observe_duration();

        Ok(invoice)
    }

    /// Get the line snapshots for an invoice, in display order.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn get_invoice_lines(&self, invoice_id: Uuid) -> Result<Vec<InvoiceLine>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice_lines"])
            .start_timer();

        let lines = sqlx::query_as::<_, InvoiceLine>(
            r#"
            SELECT line_id, invoice_id, service_item_id, description, variant, quantity,
                unit_price, total, sort_order, created_utc
            FROM invoice_lines
            WHERE invoice_id = $1
            ORDER BY sort_order, created_utc
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice lines: {}", e))
        })?;

        timer.observe_duration();

        Ok(lines)
    }

    /// List invoices with optional filters and keyset pagination.
    #[instrument(skip(self, filter))]
    pub async fn list_invoices(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let limit = filter.page_size.clamp(1, 100) as i64;
        let status_str = filter.status.map(|s| s.as_str().to_string());

        let invoices = if let Some(cursor) = filter.page_token {
            sqlx::query_as::<_, Invoice>(
                r#"
                SELECT invoice_id, invoice_number, customer_id, customer_name, customer_phone, customer_email,
                    delivery_date, status, payment_method, paid, subtotal, tax, total, employee_id,
                    cancelled_reason, cancelled_by, created_utc, paid_utc, delivered_utc, cancelled_utc
                FROM invoices
                WHERE ($1::varchar IS NULL OR status = $1)
                  AND ($2::uuid IS NULL OR customer_id = $2)
                  AND invoice_id > $3
                ORDER BY invoice_id
                LIMIT $4
                "#,
            )
            .bind(&status_str)
            .bind(filter.customer_id)
            .bind(cursor)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, Invoice>(
                r#"
                SELECT invoice_id, invoice_number, customer_id, customer_name, customer_phone, customer_email,
                    delivery_date, status, payment_method, paid, subtotal, tax, total, employee_id,
                    cancelled_reason, cancelled_by, created_utc, paid_utc, delivered_utc, cancelled_utc
                FROM invoices
                WHERE ($1::varchar IS NULL OR status = $1)
                  AND ($2::uuid IS NULL OR customer_id = $2)
                ORDER BY invoice_id
                LIMIT $3
                "#,
            )
            .bind(&status_str)
            .bind(filter.customer_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();

        Ok(invoices)
    }

    // -------------------------------------------------------------------------
    // Lifecycle Operations
    // -------------------------------------------------------------------------

    /// Apply a status transition under a per-order row lock.
    ///
    /// The invoice is read `FOR UPDATE`, the pure guard is evaluated against
    /// that snapshot, and the update carries an expected-status predicate.
    /// Two operators racing on the same order serialize on the lock, so
    /// neither can commit against a stale guard evaluation.
    #[instrument(skip(self, reason), fields(invoice_id = %invoice_id, target = target.as_str()))]
    pub async fn transition_status(
        &self,
        invoice_id: Uuid,
        target: OrderStatus,
        role: ActorRole,
        employee_id: Uuid,
        reason: Option<&str>,
    ) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["transition_status"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT invoice_id, invoice_number, customer_id, customer_name, customer_phone, customer_email,
                delivery_date, status, payment_method, paid, subtotal, tax, total, employee_id,
                cancelled_reason, cancelled_by, created_utc, paid_utc, delivered_utc, cancelled_utc
            FROM invoices
            WHERE invoice_id = $1
            FOR UPDATE
            "#,
        )
        .bind(invoice_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to lock invoice: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

        let current = OrderStatus::from_string(&invoice.status);
        check_transition(current, target, invoice.paid, role, reason)?;

        let cancelling = target == OrderStatus::Cancelled;
        let cancelled_by = cancelling.then_some(employee_id);
        let cancel_reason = if cancelling {
            reason.map(|r| r.trim().to_string())
        } else {
            None
        };

        let updated = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET status = $2,
                delivered_utc = CASE WHEN $2 = 'delivered' THEN NOW() ELSE delivered_utc END,
                cancelled_utc = CASE WHEN $2 = 'cancelled' THEN NOW() ELSE cancelled_utc END,
                cancelled_reason = CASE WHEN $2 = 'cancelled' THEN $4::varchar ELSE cancelled_reason END,
                cancelled_by = CASE WHEN $2 = 'cancelled' THEN $5::uuid ELSE cancelled_by END
            WHERE invoice_id = $1 AND status = $3
            RETURNING invoice_id, invoice_number, customer_id, customer_name, customer_phone, customer_email,
                delivery_date, status, payment_method, paid, subtotal, tax, total, employee_id,
                cancelled_reason, cancelled_by, created_utc, paid_utc, delivered_utc, cancelled_utc
            "#,
        )
        .bind(invoice_id)
        .bind(target.as_str())
        .bind(current.as_str())
        .bind(cancel_reason)
        .bind(cancelled_by)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update status: {}", e)))?
        .ok_or_else(|| AppError::Conflict(anyhow::anyhow!("Invoice was modified concurrently")))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        record_transition(current.as_str(), target.as_str());

        info!(
            invoice_number = %updated.invoice_number,
            from = current.as_str(),
            to = target.as_str(),
            "Order status changed"
        );

        Ok(updated)
    }

    // -------------------------------------------------------------------------
    // Payment Operations
    // -------------------------------------------------------------------------

    /// Collect payment for an invoice, exactly once.
    ///
    /// Independent of the status machine; the delivery guard reads the flag
    /// this writes. The unpaid→paid flip happens in one guarded update under
    /// the row lock, so a double collection always surfaces as `AlreadyPaid`.
    #[instrument(skip(self), fields(invoice_id = %invoice_id, method = method.as_str()))]
    pub async fn collect_payment(
        &self,
        invoice_id: Uuid,
        method: PaymentMethod,
    ) -> Result<Invoice, AppError> {
        if !method.is_collectible() {
            return Err(PaymentError::NotCollectible {
                method: method.as_str().to_string(),
            }
            .into());
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["collect_payment"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT invoice_id, invoice_number, customer_id, customer_name, customer_phone, customer_email,
                delivery_date, status, payment_method, paid, subtotal, tax, total, employee_id,
                cancelled_reason, cancelled_by, created_utc, paid_utc, delivered_utc, cancelled_utc
            FROM invoices
            WHERE invoice_id = $1
            FOR UPDATE
            "#,
        )
        .bind(invoice_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to lock invoice: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

        if invoice.paid {
            return Err(PaymentError::AlreadyPaid {
                invoice_number: invoice.invoice_number,
            }
            .into());
        }

        let updated = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET paid = TRUE,
                payment_method = $2,
                paid_utc = NOW()
            WHERE invoice_id = $1 AND paid = FALSE
            RETURNING invoice_id, invoice_number, customer_id, customer_name, customer_phone, customer_email,
                delivery_date, status, payment_method, paid, subtotal, tax, total, employee_id,
                cancelled_reason, cancelled_by, created_utc, paid_utc, delivered_utc, cancelled_utc
            "#,
        )
        .bind(invoice_id)
        .bind(method.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to record payment: {}", e)))?
        .ok_or_else(|| AppError::Conflict(anyhow::anyhow!("Invoice was modified concurrently")))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        record_payment(method.as_str());

        info!(
            invoice_number = %updated.invoice_number,
            method = method.as_str(),
            amount = %updated.total,
            "Payment collected"
        );

        Ok(updated)
    }
}
