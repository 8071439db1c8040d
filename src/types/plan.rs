string_enum! {
    pub enum PlanTier {
        Free => "FREE",
        Basic => "BASIC",
        Standard => "STANDARD",
        Premium => "PREMIUM",
    }
}

string_enum! {
    /// A capability that a plan tier may or may not include.
    pub enum Feature {
        Notices => "notices",
        Gallery => "gallery",
        StaffDirectory => "staff_directory",
        Achievements => "achievements",
        Admissions => "admissions",
        CustomPages => "custom_pages",
        CustomDomain => "custom_domain",
        SslCertificate => "ssl_certificate",
        WhoisPrivacy => "whois_privacy",
        DomainTransfer => "domain_transfer",
        SeoTools => "seo_tools",
        Analytics => "analytics",
        PremiumTemplates => "premium_templates",
        RemoveBranding => "remove_branding",
    }
}
