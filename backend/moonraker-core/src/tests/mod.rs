mod merger;
mod readiness;
mod subscription;
mod support;
