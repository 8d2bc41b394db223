// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use prowl::utils::telemetry;

    #[test]
    fn test_telemetry_initialization_is_idempotent() {
        telemetry::init_telemetry();
        assert!(tracing::dispatcher::has_been_set());

        // A subscriber is already installed, so the second call is a no-op
        assert!(!telemetry::init_telemetry());
        assert!(tracing::dispatcher::has_been_set());

        tracing::info!(
            keyword = "wireless headphones",
            products_found = 6,
            "Search finished"
        );
        tracing::warn!(error = "HTTP 503", "Search page failed");
    }
}
