// ABOUTME: Static hosting package catalog offered by the storefront
// ABOUTME: Orders snapshot name and price from here at submission time

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct HostingPackage {
    pub name: &'static str,
    pub price: i64,
    pub storage: &'static str,
    pub bandwidth: &'static str,
    pub domain: &'static str,
    pub features: &'static [&'static str],
}

pub const PACKAGES: &[HostingPackage] = &[
    // Student packages
    HostingPackage {
        name: "Pelajar Pemula",
        price: 10_000,
        storage: "10 MB",
        bandwidth: "1 Mbps",
        domain: "Subdomain",
        features: &["24/7 Support", "SSL Gratis", "Backup Mingguan"],
    },
    HostingPackage {
        name: "Pelajar Basic",
        price: 15_000,
        storage: "50 MB",
        bandwidth: "3 Mbps",
        domain: "Subdomain",
        features: &["24/7 Support", "SSL Gratis", "Backup Harian"],
    },
    HostingPackage {
        name: "Pelajar Advance",
        price: 25_000,
        storage: "100 MB",
        bandwidth: "7 Mbps",
        domain: "Subdomain",
        features: &["24/7 Support", "SSL Gratis", "Backup Harian", "Priority Support"],
    },
    HostingPackage {
        name: "Pelajar Pro",
        price: 50_000,
        storage: "250 MB",
        bandwidth: "15 Mbps",
        domain: "Subdomain",
        features: &["24/7 Support", "SSL Gratis", "Backup Real-time", "Priority Support"],
    },
    HostingPackage {
        name: "Pelajar Expert",
        price: 120_000,
        storage: "1 GB",
        bandwidth: "Unlimited",
        domain: "Subdomain",
        features: &[
            "24/7 Support",
            "SSL Gratis",
            "Backup Real-time",
            "Dedicated Support",
            "CDN",
        ],
    },
    HostingPackage {
        name: "Pelajar Enterprise",
        price: 150_000,
        storage: "5 GB",
        bandwidth: "Unlimited",
        domain: "Free Custom Domain",
        features: &[
            "24/7 Support",
            "SSL Gratis",
            "Backup Real-time",
            "Dedicated Support",
            "CDN",
            "Full Control",
        ],
    },
    // Personal packages
    HostingPackage {
        name: "Personal Standard",
        price: 150_000,
        storage: "3 GB",
        bandwidth: "50 Mbps",
        domain: "Free Custom Domain",
        features: &[
            "24/7 Support",
            "SSL Gratis",
            "Backup Real-time",
            "Dedicated Support",
            "Priority Deployment",
        ],
    },
    HostingPackage {
        name: "Personal Pro",
        price: 300_000,
        storage: "10 GB",
        bandwidth: "100 Mbps",
        domain: "Free Custom Domain",
        features: &[
            "24/7 Support",
            "SSL Gratis",
            "Backup Real-time",
            "Dedicated Support",
            "CDN",
            "Priority Deployment",
            "Full Control",
        ],
    },
];

pub fn find(name: &str) -> Option<&'static HostingPackage> {
    PACKAGES.iter().find(|package| package.name == name)
}
