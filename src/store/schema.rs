pub const SCHEMA: &str = r#"
-- Schools are the tenants; everything else hangs off a school
CREATE TABLE IF NOT EXISTS schools (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    subdomain TEXT NOT NULL UNIQUE,
    custom_domain TEXT UNIQUE,
    domain_verified INTEGER NOT NULL DEFAULT 0,
    verification_token TEXT,

    -- Plan and subscription
    plan TEXT NOT NULL DEFAULT 'FREE',
    subscription_ends TEXT,             -- NULL = no expiry
    status TEXT NOT NULL DEFAULT 'DRAFT',

    -- Profile and SEO
    tagline TEXT,
    logo_url TEXT,
    email TEXT,
    phone TEXT,
    address TEXT,
    theme_color TEXT,
    seo_title TEXT,
    seo_description TEXT,
    seo_keywords TEXT,
    active_template_id TEXT,

    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Users; school_id NULL marks a platform admin
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,
    name TEXT NOT NULL,
    role TEXT NOT NULL,
    school_id TEXT REFERENCES schools(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Session tokens
CREATE TABLE IF NOT EXISTS tokens (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL,          -- argon2id hash with embedded salt
    token_lookup TEXT NOT NULL,        -- lookup segment of the raw token
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT,                   -- NULL = never
    last_used_at TEXT
);

-- Per-school plan feature overrides
CREATE TABLE IF NOT EXISTS feature_flags (
    school_id TEXT NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    feature TEXT NOT NULL,
    is_enabled INTEGER NOT NULL,
    updated_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (school_id, feature)
);

-- Content
CREATE TABLE IF NOT EXISTS notices (
    id TEXT PRIMARY KEY,
    school_id TEXT NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    category TEXT,
    is_important INTEGER NOT NULL DEFAULT 0,
    publish_date TEXT,
    is_visible INTEGER NOT NULL DEFAULT 1,
    sort_order INTEGER NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS galleries (
    id TEXT PRIMARY KEY,
    school_id TEXT NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT,
    cover_image TEXT,
    is_visible INTEGER NOT NULL DEFAULT 1,
    sort_order INTEGER NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS gallery_images (
    id TEXT PRIMARY KEY,
    school_id TEXT NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    gallery_id TEXT NOT NULL REFERENCES galleries(id) ON DELETE CASCADE,
    url TEXT NOT NULL,
    caption TEXT,
    sort_order INTEGER NOT NULL,       -- scoped to the gallery
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS achievements (
    id TEXT PRIMARY KEY,
    school_id TEXT NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT,
    year INTEGER,
    category TEXT,
    image_url TEXT,
    is_visible INTEGER NOT NULL DEFAULT 1,
    sort_order INTEGER NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS staff (
    id TEXT PRIMARY KEY,
    school_id TEXT NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    designation TEXT NOT NULL,
    department TEXT,
    email TEXT,
    phone TEXT,
    photo_url TEXT,
    bio TEXT,
    is_visible INTEGER NOT NULL DEFAULT 1,
    sort_order INTEGER NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS pages (
    id TEXT PRIMARY KEY,
    school_id TEXT NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    slug TEXT NOT NULL,
    content TEXT NOT NULL,
    meta_title TEXT,
    meta_description TEXT,
    is_published INTEGER NOT NULL DEFAULT 0,
    sort_order INTEGER NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),

    UNIQUE(school_id, slug)
);

CREATE TABLE IF NOT EXISTS website_sections (
    id TEXT PRIMARY KEY,
    school_id TEXT NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    section_type TEXT NOT NULL,
    title TEXT,
    content TEXT NOT NULL,             -- JSON
    is_visible INTEGER NOT NULL DEFAULT 1,
    sort_order INTEGER NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS admissions (
    id TEXT PRIMARY KEY,
    school_id TEXT NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    session TEXT NOT NULL,
    is_open INTEGER NOT NULL DEFAULT 0,
    start_date TEXT,
    end_date TEXT,
    description TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS admission_enquiries (
    id TEXT PRIMARY KEY,
    school_id TEXT NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    admission_id TEXT REFERENCES admissions(id) ON DELETE SET NULL,
    student_name TEXT NOT NULL,
    parent_name TEXT NOT NULL,
    email TEXT NOT NULL,
    phone TEXT NOT NULL,
    grade TEXT NOT NULL,
    message TEXT,
    status TEXT NOT NULL DEFAULT 'NEW',
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS templates (
    id TEXT PRIMARY KEY,
    school_id TEXT REFERENCES schools(id) ON DELETE CASCADE,  -- NULL for catalog templates
    name TEXT NOT NULL,
    description TEXT,
    config TEXT NOT NULL,              -- JSON
    is_premium INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Domains
CREATE TABLE IF NOT EXISTS dns_records (
    id TEXT PRIMARY KEY,
    school_id TEXT NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    domain TEXT NOT NULL,
    record_type TEXT NOT NULL,
    name TEXT NOT NULL,
    value TEXT NOT NULL,
    ttl INTEGER NOT NULL,
    priority INTEGER,
    propagated_at TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS domain_transfers (
    id TEXT PRIMARY KEY,
    school_id TEXT NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    domain TEXT NOT NULL UNIQUE,
    transfer_status TEXT NOT NULL,
    lock_status TEXT NOT NULL,
    auth_code TEXT,
    notes TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS ssl_certificates (
    id TEXT PRIMARY KEY,
    school_id TEXT NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    domain TEXT NOT NULL UNIQUE,
    status TEXT NOT NULL,
    issuer TEXT,
    cert_path TEXT,
    key_path TEXT,
    issued_at TEXT,
    expires_at TEXT,
    error_message TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS whois_privacy (
    id TEXT PRIMARY KEY,
    school_id TEXT NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    domain TEXT NOT NULL UNIQUE,
    is_enabled INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL,
    error_message TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Durable delayed transitions and their log
CREATE TABLE IF NOT EXISTS lifecycle_tasks (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    target_id TEXT NOT NULL,
    run_at TEXT NOT NULL,
    attempts INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL,
    last_error TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS lifecycle_events (
    id TEXT PRIMARY KEY,
    entity_kind TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    from_status TEXT,
    to_status TEXT NOT NULL,
    trigger_name TEXT NOT NULL,
    note TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Billing
CREATE TABLE IF NOT EXISTS billing_orders (
    id TEXT PRIMARY KEY,               -- provider order id
    school_id TEXT NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    plan TEXT NOT NULL,
    cycle TEXT NOT NULL,
    amount INTEGER NOT NULL,
    currency TEXT NOT NULL,
    receipt TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS payments (
    id TEXT PRIMARY KEY,
    school_id TEXT NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    provider_order_id TEXT NOT NULL,
    provider_payment_id TEXT NOT NULL UNIQUE,
    amount INTEGER NOT NULL,
    currency TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS subscriptions (
    id TEXT PRIMARY KEY,
    school_id TEXT NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    plan TEXT NOT NULL,
    cycle TEXT NOT NULL,
    amount INTEGER NOT NULL,
    status TEXT NOT NULL,
    starts_at TEXT NOT NULL,
    ends_at TEXT NOT NULL,
    provider_order_id TEXT NOT NULL UNIQUE,
    provider_payment_id TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_users_school ON users(school_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_tokens_lookup ON tokens(token_lookup);
CREATE INDEX IF NOT EXISTS idx_tokens_user ON tokens(user_id);
CREATE INDEX IF NOT EXISTS idx_notices_school ON notices(school_id, sort_order);
CREATE INDEX IF NOT EXISTS idx_galleries_school ON galleries(school_id, sort_order);
CREATE INDEX IF NOT EXISTS idx_gallery_images_gallery ON gallery_images(gallery_id, sort_order);
CREATE INDEX IF NOT EXISTS idx_achievements_school ON achievements(school_id, sort_order);
CREATE INDEX IF NOT EXISTS idx_staff_school ON staff(school_id, sort_order);
CREATE INDEX IF NOT EXISTS idx_pages_school ON pages(school_id, sort_order);
CREATE INDEX IF NOT EXISTS idx_sections_school ON website_sections(school_id, sort_order);
CREATE INDEX IF NOT EXISTS idx_admissions_school ON admissions(school_id);
CREATE INDEX IF NOT EXISTS idx_enquiries_school ON admission_enquiries(school_id);
CREATE INDEX IF NOT EXISTS idx_templates_school ON templates(school_id);
CREATE INDEX IF NOT EXISTS idx_dns_records_school ON dns_records(school_id);
CREATE INDEX IF NOT EXISTS idx_tasks_due ON lifecycle_tasks(status, run_at);
CREATE INDEX IF NOT EXISTS idx_events_entity ON lifecycle_events(entity_kind, entity_id);
CREATE INDEX IF NOT EXISTS idx_payments_school ON payments(school_id);
CREATE INDEX IF NOT EXISTS idx_subscriptions_school ON subscriptions(school_id);
"#;

/// Tables reported by the diagnostics endpoint.
pub const COUNTED_TABLES: &[&str] = &[
    "schools",
    "users",
    "notices",
    "galleries",
    "gallery_images",
    "achievements",
    "staff",
    "pages",
    "website_sections",
    "admissions",
    "admission_enquiries",
    "templates",
    "dns_records",
    "domain_transfers",
    "ssl_certificates",
    "whois_privacy",
    "payments",
    "subscriptions",
];
