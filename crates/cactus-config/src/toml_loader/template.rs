//! Default TOML config template with inline documentation comments.

pub(crate) fn default_config_toml() -> &'static str {
    r##"# Cactus Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[engine]
# model = "/path/to/model.gguf"
# mmproj = "/path/to/mmproj.gguf"
# n_ctx = 2048            # context window in tokens
# n_batch = 32
# n_gpu_layers = 99       # 0 = CPU only
# n_threads = 4
# embedding = false

[retry]
# max_attempts = 3        # 1-10, per configuration candidate
# base_delay_ms = 1000    # 0-60000, doubles on each retry

[routing]
# embedding_mode = "local"   # local, remote, local-first, remote-first

[remote]
# endpoint = "https://example.com/v1/embed"
# model = "text-embedding-005"
# token = ""              # falls back to $CACTUS_TOKEN
# timeout_secs = 30       # 1-600

[assets]
# model_url = "https://huggingface.co/.../model.gguf"
# mmproj_url = "https://huggingface.co/.../mmproj.gguf"

[logging]
# level = "info"          # trace, debug, info, warn, error
# directive = "cactus_lm=debug"
"##
}
